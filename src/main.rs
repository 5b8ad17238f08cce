use backup_sphere::core::system::System;

#[tokio::main]
async fn main() {
    let mut system = match System::initialize().await {
        Ok(system) => system,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };
    if let Err(err) = system.run().await {
        eprintln!("{err}");
    }
    system.terminate().await;
}
