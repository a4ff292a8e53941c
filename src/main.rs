fn main() -> anyhow::Result<()> {
    container_network::run()?;
    Ok(())
}
