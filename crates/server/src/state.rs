use query_relay::QueryRelay;

pub struct AppState {
    pub relay: QueryRelay,
}
