//! Prints CUDA device availability, the device count, the current device
//! index, and the name of device 0, one per line.
//!
//! A missing driver or device terminates the run with the propagated error;
//! lines already printed stay printed.

use eyre::Result;

fn main() -> Result<()> {
    run()
}

#[cfg(feature = "cuda")]
fn run() -> Result<()> {
    use cudarc::driver::{result, CudaDevice};

    let available = result::init().is_ok()
        && result::device::get_count()
            .map(|count| count > 0)
            .unwrap_or(false);
    println!("{available}");

    let count = result::device::get_count()?;
    println!("{count}");

    let device = CudaDevice::new(0)?;
    println!("{}", device.ordinal());
    println!("{}", device.name()?);

    Ok(())
}

#[cfg(not(feature = "cuda"))]
fn run() -> Result<()> {
    eprintln!("cuda-smoke was built without CUDA support.");
    eprintln!("Rebuild with: cargo run -p cuda-smoke --features cuda");
    std::process::exit(1);
}
