#![deny(warnings)]

mod web;

use logging::*;

#[tokio::main]
async fn main() {
    let log = DEFAULT.new(o!("function" => "main"));
    info!(log, "Starting up");

    tokio::spawn(forecast::run());
    web::run().await;
}
