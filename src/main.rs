fn main() {
    #[cfg(feature = "cli")]
    rudiff::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("rudiff: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
