use std::env;

fn main() {
    match vr_battery::cli::run(env::args_os()) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("Error: {err:#}");
            std::process::exit(1);
        }
    }
}
