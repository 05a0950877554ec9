use anyhow::Result;

fn main() -> Result<()> {
    ledwall::app::run()
}
