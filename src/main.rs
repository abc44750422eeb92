fn main() {
    if let Err(err) = dmslabel::run() {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}
