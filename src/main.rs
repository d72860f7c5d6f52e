fn main() -> anyhow::Result<()> {
    marsview::viewer::run()
}
