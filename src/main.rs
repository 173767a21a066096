fn main() -> anyhow::Result<()> {
    skyline::run(skyline::Config::default())
}
