fn main() {
    if let Err(err) = kpi_dashboard::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
