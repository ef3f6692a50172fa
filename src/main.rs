fn main() -> joules_power::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    joules_power::cli::run()
}
