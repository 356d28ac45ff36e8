use std::io;

use v4lcam::Device;

fn main() -> io::Result<()> {
    env_logger::init();

    let devices = v4lcam::find_devices();
    if devices.is_empty() {
        println!("No capture devices found");
        return Ok(());
    }

    for info in devices {
        println!("{}", info);

        let dev = Device::open(&info.path)?;
        println!("Buffer info: {:?}", dev.buffer_info()?);
        println!("Supported configs:");
        for cfg in dev.list_configs()? {
            println!("  {}", cfg);
        }
        println!();
    }

    Ok(())
}
