mod accounts;
mod commands;
mod error;
mod history;
mod messages;
mod mute;
mod render;
mod server;

use std::sync::Arc;

use warp::Filter;

use server::Server;

const PORT: u16 = 8080;
const USER_DATA_FILE: &str = "user_data.json";

#[tokio::main]
async fn main() {
    env_logger::init();

    let server = Server::new(USER_DATA_FILE).expect("failed to load the account store");
    let server = Arc::new(server);

    let ws_route = warp::path("ws")
        .and(warp::ws())
        .map(move |ws: warp::ws::Ws| {
            let server = server.clone();
            ws.on_upgrade(move |socket| {
                let server = server.clone();
                async move {
                    server.handle_connection(socket).await;
                }
            })
        });

    let static_files = warp::fs::dir("public");

    let routes = ws_route
        .or(static_files)
        .with(warp::cors().allow_any_origin());

    log::info!("chat server starting on port {PORT}...");
    warp::serve(routes).run(([0, 0, 0, 0], PORT)).await;
}
