use cpal::traits::{DeviceTrait, HostTrait};
use cpal::Device;

fn get_host() -> cpal::Host {
    cpal::default_host()
}

pub fn get_or_default_input(device_name: Option<String>) -> anyhow::Result<Device> {
    let host = get_host();
    tracing::debug!("Host: {:?}", host.id());
    let target = match device_name {
        Some(name) => name,
        None => {
            let default = host
                .default_input_device()
                .ok_or_else(|| anyhow::anyhow!("No default input device"))?;
            default.name()?
        }
    };

    let mut device: Option<Device> = None;
    let input_devices = host.input_devices()?;
    for in_device in input_devices {
        if in_device.name().is_ok_and(|name| name == target) {
            device = Some(in_device);
        }
    }
    device.ok_or_else(|| anyhow::anyhow!("No target input device found"))
}

pub fn get_or_default_output(device_name: Option<String>) -> anyhow::Result<Device> {
    let host = get_host();
    let target = match device_name {
        Some(name) => name,
        None => {
            let default = host
                .default_output_device()
                .ok_or_else(|| anyhow::anyhow!("No default output device"))?;
            default.name()?
        }
    };

    let mut device: Option<Device> = None;
    let output_devices = host.output_devices()?;
    for out_device in output_devices {
        if out_device.name().is_ok_and(|name| name == target) {
            device = Some(out_device);
        }
    }
    device.ok_or_else(|| anyhow::anyhow!("No target output device found"))
}

pub fn get_available_inputs() -> anyhow::Result<String> {
    let host = get_host();

    let mut device_names: Vec<String> = Vec::new();
    let default_device = host
        .default_input_device()
        .ok_or_else(|| anyhow::anyhow!("No default input device"))?
        .name()?;
    for in_device in host.input_devices()? {
        let d_name = in_device.name()?;
        let d_cfg = in_device.default_input_config()?;
        let d_sampling_rate = d_cfg.sample_rate().0;
        let d_ch = d_cfg.channels();

        let mut d = format!(" * {}({}ch, {}hz)", d_name, d_ch, d_sampling_rate);
        if d_name == default_device {
            d.push_str(" [default]");
        }
        device_names.push(d);
    }
    Ok(device_names.join("\n"))
}

pub fn get_available_outputs() -> anyhow::Result<String> {
    let host = get_host();

    let mut device_names: Vec<String> = Vec::new();
    let default_device = host
        .default_output_device()
        .ok_or_else(|| anyhow::anyhow!("No default output device"))?
        .name()?;
    for out_device in host.output_devices()? {
        let d_name = out_device.name()?;
        let d_cfg = out_device.default_output_config()?;
        let d_sampling_rate = d_cfg.sample_rate().0;
        let d_ch = d_cfg.channels();

        let mut d = format!(" * {}({}ch, {}hz)", d_name, d_ch, d_sampling_rate);
        if d_name == default_device {
            d.push_str(" [default]");
        }
        device_names.push(d);
    }
    Ok(device_names.join("\n"))
}
