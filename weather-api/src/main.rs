fn main() {
    if let Err(err) = weather_station_api::app::run_api() {
        eprintln!("api startup failed: {err}");
        std::process::exit(1);
    }
}
