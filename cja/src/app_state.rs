pub trait AppState: Clone + Send + Sync + 'static {
    fn version(&self) -> &str;
}
