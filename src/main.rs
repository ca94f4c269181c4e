use astra::Server;
use std::net::SocketAddr;
use sublethub::config::Config;
use sublethub::db::{init_db, Database};
use sublethub::responses::error_to_response;
use sublethub::router::handle;
use sublethub::storage::FsObjectStore;

fn main() {
    let cfg = Config::from_env();

    let db = Database::new(cfg.db_path.clone());
    if let Err(e) = init_db(&db, "sql/schema.sql") {
        eprintln!("Database initialization failed: {e}");
        std::process::exit(1);
    }

    let store = FsObjectStore::new(cfg.storage_root.clone());

    let addr: SocketAddr = match cfg.addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            eprintln!("Invalid bind address {:?}: {e}", cfg.addr);
            std::process::exit(1);
        }
    };

    println!("Listing service at http://{addr}");
    let server = Server::bind(&addr).max_workers(8);

    let result = server.serve(move |req, _info| match handle(req, &db, &store) {
        Ok(resp) => resp,
        Err(err) => error_to_response(err),
    });

    if let Err(e) = result {
        eprintln!("Server ended with error: {e}");
    }
}
