pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter("info,vitrea_harness=debug")
        .init();
}
