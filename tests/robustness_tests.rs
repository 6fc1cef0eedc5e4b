use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn test_malformed_csv_handling() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let mut wtr = csv::Writer::from_path(file.path()).unwrap();
    wtr.write_record(["action", "partner", "dsa_order_id", "control_no", "amount", "currency"])
        .unwrap();

    // Valid payout
    wtr.write_record(["stage-disburse", "WU", "O1", "CTRL1", "1.00", "PHP"])
        .unwrap();
    // Invalid action
    wtr.write_record(["refund", "WU", "O2", "CTRL2", "1.00", "PHP"])
        .unwrap();
    // Valid payout again
    wtr.write_record(["stage-disburse", "WU", "O3", "CTRL3", "2.00", "PHP"])
        .unwrap();
    wtr.flush().unwrap();
    drop(wtr);

    let mut cmd = Command::new(cargo_bin!("remitgw"));
    cmd.arg(file.path());

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Error reading request"))
        .stdout(predicate::str::contains(",WU,CTRL1,O1,disburse,stage,success"))
        .stdout(predicate::str::contains(",WU,CTRL3,O3,disburse,stage,success"))
        .stdout(predicate::str::contains("CTRL2").not());
}

#[test]
fn test_invalid_amounts() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let mut wtr = csv::Writer::from_path(file.path()).unwrap();
    wtr.write_record(["action", "partner", "dsa_order_id", "control_no", "amount", "currency"])
        .unwrap();

    // Text in amount field
    wtr.write_record(["stage-disburse", "WU", "O1", "CTRL1", "not_a_number", "PHP"])
        .unwrap();
    // More decimals than the currency allows
    wtr.write_record(["stage-disburse", "WU", "O2", "CTRL2", "1.005", "PHP"])
        .unwrap();
    // Unknown currency shape
    wtr.write_record(["stage-disburse", "WU", "O3", "CTRL3", "1.00", "PESO"])
        .unwrap();
    // Valid payout in a zero-decimal currency
    wtr.write_record(["stage-disburse", "WU", "O4", "CTRL4", "500", "JPY"])
        .unwrap();
    wtr.flush().unwrap();
    drop(wtr);

    let mut cmd = Command::new(cargo_bin!("remitgw"));
    cmd.arg(file.path());

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Error processing request"))
        .stdout(predicate::str::contains(",WU,CTRL4,O4,disburse,stage,success,,,500,500,JPY"))
        .stdout(predicate::str::contains("CTRL1").not())
        .stdout(predicate::str::contains("CTRL2").not())
        .stdout(predicate::str::contains("CTRL3").not());
}

#[test]
fn test_unsupported_leg_and_unknown_partner() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let mut wtr = csv::Writer::from_path(file.path()).unwrap();
    wtr.write_record(["action", "partner", "dsa_order_id", "control_no", "amount", "currency"])
        .unwrap();

    wtr.write_record(["stage-send", "RIA", "O1", "", "1.00", "PHP"])
        .unwrap();
    wtr.write_record(["stage-send", "NOPE", "O2", "", "1.00", "PHP"])
        .unwrap();
    wtr.flush().unwrap();
    drop(wtr);

    let mut cmd = Command::new(cargo_bin!("remitgw"));
    cmd.arg(file.path());

    // The unsupported leg is recorded; the unknown partner never reaches a store
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(",RIA,,O1,send,stage,fail,,unsupported,0.00,0.00,PHP"))
        .stdout(predicate::str::contains("NOPE").not());
}
