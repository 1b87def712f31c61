mod cookie;
mod db;
mod form;
mod lookup;
mod server;
mod types;

use cookie::CookieJar;
use env_logger::Env;
use form::{FormField, StaticField, VehicleForm};
use log::{error, info};
use lookup::{HttpTransport, LookupTrigger, RecordingNavigator};
use std::env;
use std::sync::Arc;
use tokio::sync::Mutex;
use url::Url;

#[macro_use]
extern crate failure;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    info!("Starting plate-lookup");

    let args: Vec<String> = env::args().skip(1).collect();
    let result = match args.first().map(String::as_str) {
        None => serve().await,
        Some("lookup") => lookup_from_terminal(&args[1..]).await,
        Some(x) => Err(format_err!("Unrecognized command {}", x)),
    };
    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
    info!("Exiting main");
}

async fn serve() -> Result<(), failure::Error> {
    let db_path = env::var("DB_PATH").unwrap_or_else(|_| "/data/vehicles.db".to_string());
    let port = match env::var("PORT") {
        Ok(port) => port
            .parse::<u16>()
            .map_err(|_| format_err!("Invalid PORT {}", port))?,
        Err(_) => 8402,
    };
    let conn = db::open(&db_path)?;
    server::run(Arc::new(Mutex::new(conn)), port).await;
    Ok(())
}

/// One blur against a running server, with the form filled from the
/// command line and the cookie string taken from COOKIE.
async fn lookup_from_terminal(args: &[String]) -> Result<(), failure::Error> {
    if args.is_empty() {
        return Err(format_err!(
            "Usage: plate-lookup lookup <PLATE> [VEHICLE_TYPE] [OWNER]"
        ));
    }
    let field = |i: usize| {
        args.get(i)
            .map(|value| Arc::new(StaticField(value.clone())) as Arc<dyn FormField>)
    };
    let form = VehicleForm {
        license_plate: field(0),
        vehicle_type: field(1),
        owner: field(2),
    };

    let host = env::var("HOST").unwrap_or_else(|_| "localhost:8402".to_string());
    let base = Url::parse(&format!("http://{}/", host))?;
    let navigator = Arc::new(RecordingNavigator::default());
    let trigger = LookupTrigger::bind(
        form,
        Arc::new(CookieJar::new(env::var("COOKIE").unwrap_or_default())),
        Arc::new(HttpTransport::new(&base)?),
        navigator.clone(),
    )
    .ok_or_else(|| format_err!("Missing license plate"))?;

    match trigger.on_blur() {
        Some(task) => task
            .await
            .map_err(|e| format_err!("Lookup task failed: {}", e))?,
        None => {
            info!("Blank license plate, nothing to look up");
            return Ok(());
        }
    }
    match navigator.visited().last() {
        Some(path) => println!("{}", base.join(path)?),
        None => info!("No vehicle to open for plate {}", args[0].trim()),
    }
    Ok(())
}
