use std::env;
use std::io::{self, Read};
use std::time::Instant;

use v4lcam::Device;

fn main() -> io::Result<()> {
    env_logger::init();

    let path = env::args().nth(1).unwrap_or_else(|| "/dev/video0".to_string());
    println!("Using device: {}\n", path);

    // Capture 4 frames by default
    let count = 4;

    let mut dev = Device::open(&path)?;
    println!("Active config: {}", dev.get_config()?);
    println!("Buffer info: {:?}\n", dev.buffer_info()?);

    dev.turn_on()?;

    // warmup
    dev.capture()?;

    let start = Instant::now();
    let mut data = Vec::new();
    for _ in 0..count {
        let t0 = Instant::now();
        let mut frame = dev.capture()?;
        data.clear();
        frame.read_to_end(&mut data)?;

        println!("Buffer");
        println!("  sequence  : {}", frame.sequence());
        println!("  length    : {}", data.len());
        println!("  latency   : {} us", t0.elapsed().as_micros());
    }

    println!();
    println!("FPS: {}", count as f64 / start.elapsed().as_secs_f64());

    dev.close();
    Ok(())
}
