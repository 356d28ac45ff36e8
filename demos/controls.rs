use std::env;
use std::io;

use v4lcam::Device;

fn main() -> io::Result<()> {
    env_logger::init();

    let path = env::args().nth(1).unwrap_or_else(|| "/dev/video0".to_string());
    println!("Using device: {}\n", path);

    let dev = Device::open(&path)?;
    for ctrl in dev.list_controls()? {
        print!("{}", ctrl);
        match dev.get_control(ctrl.id) {
            Ok(value) => println!("Value      : {}\n", value),
            // buttons and write-only controls have no value
            Err(e) => println!("Value      : <{}>\n", e),
        }
    }

    Ok(())
}
