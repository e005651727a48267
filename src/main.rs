fn main() {
    if let Err(err) = cadastro_formatter::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
