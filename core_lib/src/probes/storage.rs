//! Filesystem and LVM usage probes

use super::{parse_percent, run_command, ProbeFailure, ProbeResult};
use sysinfo::Disks;
use tracing::debug;

const LVS_ARGS: [&str; 5] = [
    "--noheadings",
    "--separator",
    ",",
    "-o",
    "lv_name,lv_attr,data_percent,metadata_percent",
];

#[derive(Debug, Clone, PartialEq)]
struct ThinPool {
    name: String,
    data_percent: f64,
    metadata_percent: f64,
}

#[derive(Debug, Clone, PartialEq)]
struct VolumeGroup {
    name: String,
    size_bytes: u64,
    free_bytes: u64,
}

impl VolumeGroup {
    fn free_percent(&self) -> f64 {
        if self.size_bytes == 0 {
            return 0.0;
        }
        self.free_bytes as f64 / self.size_bytes as f64 * 100.0
    }
}

/// Checks every mounted filesystem under `prefix` against `threshold_percent`.
pub fn mount_point_sizes(prefix: &str, threshold_percent: u8) -> ProbeResult {
    let disks = Disks::new_with_refreshed_list();

    let usage: Vec<(String, f64)> = disks
        .iter()
        .filter(|disk| disk.mount_point().starts_with(prefix))
        .map(|disk| {
            let total = disk.total_space();
            let used = total.saturating_sub(disk.available_space());
            let percent = if total > 0 {
                used as f64 / total as f64 * 100.0
            } else {
                0.0
            };
            (disk.mount_point().to_string_lossy().to_string(), percent)
        })
        .collect();

    debug!("Checked {} mount points under {}", usage.len(), prefix);
    check_mount_points(prefix, &usage, threshold_percent)
}

fn check_mount_points(prefix: &str, usage: &[(String, f64)], threshold_percent: u8) -> ProbeResult {
    if usage.is_empty() {
        return Err(ProbeFailure::new(format!("No mount points under {}", prefix)));
    }
    over_threshold(usage, threshold_percent)
}

fn over_threshold(usage: &[(String, f64)], threshold_percent: u8) -> ProbeResult {
    let full: Vec<String> = usage
        .iter()
        .filter(|(_, percent)| *percent > f64::from(threshold_percent))
        .map(|(mount, percent)| format!("{} ({:.0}%)", mount, percent))
        .collect();

    if full.is_empty() {
        Ok(())
    } else {
        Err(ProbeFailure::new(format!(
            "Mount points over {}%: {}",
            threshold_percent,
            full.join(", ")
        )))
    }
}

pub fn lv_pool_sizes(threshold_percent: u8) -> ProbeResult {
    let output = run_command("lvs", &LVS_ARGS)?;
    check_thin_pools(&parse_thin_pools(&output), threshold_percent, "LV pool")
}

pub fn docker_pool(pool: &str, threshold_percent: u8) -> ProbeResult {
    let mut args = LVS_ARGS.to_vec();
    args.push(pool);
    let output = run_command("lvs", &args)?;

    let pools = parse_thin_pools(&output);
    if pools.is_empty() {
        return Err(ProbeFailure::new(format!("Docker pool {} not found", pool)));
    }

    check_thin_pools(&pools, threshold_percent, "Docker pool")
}

pub fn vg_sizes(min_free_percent: u8) -> ProbeResult {
    let output = run_command(
        "vgs",
        &[
            "--noheadings",
            "--separator",
            ",",
            "--units",
            "b",
            "--nosuffix",
            "-o",
            "vg_name,vg_size,vg_free",
        ],
    )?;

    check_volume_groups(&parse_volume_groups(&output), min_free_percent)
}

/// Keeps only thin pools (`lv_attr` starting with `t`).
fn parse_thin_pools(output: &str) -> Vec<ThinPool> {
    output
        .lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.trim().split(',').map(str::trim).collect();
            match fields.as_slice() {
                [name, attr, data, meta] if attr.starts_with('t') => Some(ThinPool {
                    name: name.to_string(),
                    data_percent: parse_percent(data)?,
                    metadata_percent: parse_percent(meta)?,
                }),
                _ => None,
            }
        })
        .collect()
}

fn check_thin_pools(pools: &[ThinPool], threshold_percent: u8, label: &str) -> ProbeResult {
    let limit = f64::from(threshold_percent);
    let full: Vec<String> = pools
        .iter()
        .filter(|pool| pool.data_percent > limit || pool.metadata_percent > limit)
        .map(|pool| {
            format!(
                "{} (data {:.1}%, metadata {:.1}%)",
                pool.name, pool.data_percent, pool.metadata_percent
            )
        })
        .collect();

    if full.is_empty() {
        Ok(())
    } else {
        Err(ProbeFailure::new(format!(
            "{} usage over {}%: {}",
            label,
            threshold_percent,
            full.join(", ")
        )))
    }
}

fn parse_volume_groups(output: &str) -> Vec<VolumeGroup> {
    output
        .lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.trim().split(',').map(str::trim).collect();
            match fields.as_slice() {
                [name, size, free] => Some(VolumeGroup {
                    name: name.to_string(),
                    size_bytes: size.parse().ok()?,
                    free_bytes: free.parse().ok()?,
                }),
                _ => None,
            }
        })
        .collect()
}

fn check_volume_groups(groups: &[VolumeGroup], min_free_percent: u8) -> ProbeResult {
    let low: Vec<String> = groups
        .iter()
        .filter(|vg| vg.free_percent() < f64::from(min_free_percent))
        .map(|vg| format!("{} ({:.1}% free)", vg.name, vg.free_percent()))
        .collect();

    if low.is_empty() {
        Ok(())
    } else {
        Err(ProbeFailure::new(format!(
            "Volume groups below {}% free: {}",
            min_free_percent,
            low.join(", ")
        )))
    }
}
