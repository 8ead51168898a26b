//! Links a host and a device PHY over the in-memory loopback and echoes words.
//!
//! - cargo run -p sataphy --example loopback
//! - cargo run -p sataphy --example loopback -- gen3 gen2 16
//!   (Gen3 host, Gen2 device, 16 words each way)

use std::{env, error::Error, time::Duration};

use sataphy::prelude::*;

/// Args: [host_grade] [device_grade] [words]
fn parse_args(
    mut args: impl Iterator<Item = String>,
) -> Result<(SpeedGrade, SpeedGrade, u32), Box<dyn Error>> {
    let host_grade: SpeedGrade = args.next().unwrap_or_else(|| "gen3".into()).parse()?;
    let device_grade: SpeedGrade = args.next().unwrap_or_else(|| "gen2".into()).parse()?;
    let count: u32 = args.next().unwrap_or_else(|| "8".into()).parse()?;
    Ok((host_grade, device_grade, count))
}

fn main() -> Result<(), Box<dyn Error>> {
    let (host_grade, device_grade, count) = parse_args(env::args().skip(1))?;

    let host = ConfigBuilder::new(Role::Host)
        .clk_freq(1_000_000)?
        .default_speed(host_grade)?
        .reset_hold(Duration::from_micros(4))?
        .oob(Duration::from_micros(40), 4)?
        .training(Duration::from_micros(200), 2)?
        .finalize()?;
    let device = Config { role: Role::Device, default_speed: device_grade, ..host.clone() };

    let mut bench = LinkBench::new(&host, &device)?;
    let Some(ticks) = bench.run_until_linked(20_000) else {
        println!(
            "No link: host {} device {} ({:?})",
            bench.host.phy().state(),
            bench.device.phy().state(),
            bench.host.phy().status().failure
        );
        return Ok(());
    };
    println!("Linked at {} after {} ticks", bench.host.phy().grade(), ticks);
    for event in bench.host.take_events() {
        println!("host   {:?}", event);
    }
    for event in bench.device.take_events() {
        println!("device {:?}", event);
    }

    bench.host.send((0..count).map(|i| 0x4849_0000 | i));
    bench.device.send((0..count).map(|i| 0x4445_0000 | i));
    bench.run_until(20_000, |b| {
        b.host.received().len() == count as usize && b.device.received().len() == count as usize
    });

    println!("device received {:08x?}", bench.device.received());
    println!("host received   {:08x?}", bench.host.received());
    println!("host statistics {:?}", bench.host.phy().status().statistics);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn test_defaults_when_no_args() {
        let (host, device, count) = parse_args(args(&[])).unwrap();
        assert_eq!((host, device, count), (SpeedGrade::Gen3, SpeedGrade::Gen2, 8));
    }

    #[test]
    fn test_bad_word_count_is_an_error() {
        assert!(parse_args(args(&["gen3", "gen2", "many"])).is_err());
        assert!(parse_args(args(&["gen3", "gen2", "-1"])).is_err());
        assert_eq!(parse_args(args(&["gen1", "gen1", "16"])).unwrap().2, 16);
    }
}
