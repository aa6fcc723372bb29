use anyhow::Result;

fn main() -> Result<()> {
    gcode_processor::cli::run()
}
