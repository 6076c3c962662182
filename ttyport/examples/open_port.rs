use std::env;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    for arg in env::args().skip(1) {
        let options = ttyport::OpenOptions::new(arg);

        match ttyport::open(&options) {
            Ok(_) => println!("opened {}", options.port_name),
            Err(err) => println!("failed to open {}: {} ({:?})", options.port_name, err, err.kind()),
        }
    }
}
