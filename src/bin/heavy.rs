use pipebench::Variant;

fn main() -> anyhow::Result<()> {
    pipebench::cli::run(Variant::Heavy)
}
