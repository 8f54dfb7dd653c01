use assert_cmd::prelude::*;
use assert_cmd::Command;
use predicates::prelude::*;
use std::error::Error;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

const NETWORK: &str = r#"
[[sources]]
label = "input"
n_atoms = 100
max_spikes = { poisson_rate_hz = 10.0 }

[[populations]]
label = "exc"
n_atoms = 300
neuron = "if_curr_exp"
max_atoms_per_core = 128
record = ["spikes"]

[[projections]]
source = "input"
target = "exc"
connector = { type = "all_to_all" }
weights = { low = 0.1, high = 0.5 }
delays = 1.0
"#;

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("write fixture");
    path
}

#[test]
fn estimate_prints_every_core() -> Result<(), Box<dyn Error>> {
    let tmp = tempdir()?;
    let network = write(tmp.path(), "net.toml", NETWORK);

    let mut cmd = Command::cargo_bin("spkplan")?;
    cmd.arg("estimate").arg("--network").arg(&network);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("exc (IF_curr_exp, 300 atoms, 1 projections, 3 cores)"))
        .stdout(predicate::str::contains("[0:128)"))
        .stdout(predicate::str::contains("[256:300)"))
        .stdout(predicate::str::contains("synaptic_matrix"));
    Ok(())
}

#[test]
fn estimate_json_is_parseable() -> Result<(), Box<dyn Error>> {
    let tmp = tempdir()?;
    let network = write(tmp.path(), "net.toml", NETWORK);

    let mut cmd = Command::cargo_bin("spkplan")?;
    cmd.args(["estimate", "--json", "--timestep-us", "100", "--network"])
        .arg(&network);
    let output = cmd.assert().success().get_output().stdout.clone();

    let report: serde_json::Value = serde_json::from_slice(&output)?;
    assert_eq!(report["timestep_us"], 100.0);
    let slices = report["populations"][0]["slices"].as_array().expect("slices");
    assert_eq!(slices.len(), 3);
    for slice in slices {
        assert!(slice["sdram_total"].as_u64().expect("total") > 0);
        assert_eq!(slice["ring_buffer_shifts"].as_array().expect("shifts").len(), 2);
    }
    Ok(())
}

#[test]
fn config_file_changes_recording_buffers() -> Result<(), Box<dyn Error>> {
    let tmp = tempdir()?;
    let network = write(tmp.path(), "net.toml", NETWORK);
    let short = write(tmp.path(), "short.toml", "[simulation]\nn_machine_time_steps = 10\n");
    let long = write(tmp.path(), "long.toml", "[simulation]\nn_machine_time_steps = 10000\n");

    let recording = |config: &Path| -> Result<u64, Box<dyn Error>> {
        let mut cmd = Command::cargo_bin("spkplan")?;
        cmd.arg("--config").arg(config).args(["estimate", "--json", "--network"]).arg(&network);
        let output = cmd.assert().success().get_output().stdout.clone();
        let report: serde_json::Value = serde_json::from_slice(&output)?;
        Ok(report["populations"][0]["slices"][0]["sdram"]["recording_variable"]
            .as_u64()
            .unwrap_or(0))
    };

    assert!(recording(&short)? < recording(&long)?);
    Ok(())
}

#[test]
fn shifts_lists_every_synapse_type() -> Result<(), Box<dyn Error>> {
    let tmp = tempdir()?;
    let network = write(tmp.path(), "net.toml", NETWORK);

    let mut cmd = Command::cargo_bin("spkplan")?;
    cmd.arg("shifts").arg("--network").arg(&network);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("synapse type 0: shift"))
        .stdout(predicate::str::contains("synapse type 1: shift 0, weight scale 32768"));
    Ok(())
}

#[test]
fn missing_network_file_fails() -> Result<(), Box<dyn Error>> {
    let tmp = tempdir()?;
    let mut cmd = Command::cargo_bin("spkplan")?;
    cmd.arg("estimate").arg("--network").arg(tmp.path().join("absent.toml"));
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Missing resource"));
    Ok(())
}

#[test]
fn unknown_target_fails() -> Result<(), Box<dyn Error>> {
    let tmp = tempdir()?;
    let broken = NETWORK.replace("target = \"exc\"", "target = \"missing\"");
    let network = write(tmp.path(), "net.toml", &broken);

    let mut cmd = Command::cargo_bin("spkplan")?;
    cmd.arg("estimate").arg("--network").arg(&network);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unknown target population 'missing'"));
    Ok(())
}

#[test]
fn zero_timestep_rejected() -> Result<(), Box<dyn Error>> {
    let tmp = tempdir()?;
    let network = write(tmp.path(), "net.toml", NETWORK);

    let mut cmd = Command::cargo_bin("spkplan")?;
    cmd.args(["estimate", "--timestep-us", "0", "--network"]).arg(&network);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("timestep_us"));
    Ok(())
}

#[test]
fn unreadable_network_file_fails() -> Result<(), Box<dyn Error>> {
    let tmp = tempdir()?;
    let mut cmd = Command::cargo_bin("spkplan")?;
    cmd.arg("estimate").arg("--network").arg(tmp.path());
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("reading network file"));
    Ok(())
}

#[test]
fn infinite_rate_rejected() -> Result<(), Box<dyn Error>> {
    let tmp = tempdir()?;
    let network = write(
        tmp.path(),
        "net.toml",
        &NETWORK.replace("record = [\"spikes\"]", "record = [\"spikes\"]\nspikes_per_second = inf"),
    );

    let mut cmd = Command::cargo_bin("spkplan")?;
    cmd.arg("shifts").arg("--network").arg(&network);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("spikes_per_second"));
    Ok(())
}
