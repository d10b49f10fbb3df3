use rust_decimal_macros::dec;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::process::Command;
use tempfile::tempdir;
use token_pnl::{
    AggregateOptions, DataError, DateSummary, aggregate_transactions, load_transactions,
    read_transactions, write_summaries,
};

const LEDGER: &str = "\
token,quantity,buy_date,sale_date,buy_price,sale_price,fee_percentage,exchange
A,1,2023-01-01,2023-02-01,10,20,0,kraken
B,3,2023-03-01,2023-04-01,40,100,5,binance
A,2,2023-01-05,2023-02-01,5,15,10,kraken
C,1,2023-05-01,2023-06-01,100,80,1,kraken
B,1,2023-03-01,2023-04-15,10,12,0,binance
";

#[test]
fn csv_to_summary_csv() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("transactions.csv");
    let output = dir.path().join("summary.csv");
    fs::write(&input, LEDGER).unwrap();

    let txs = load_transactions(&input).unwrap();
    let summaries = aggregate_transactions(&txs, &AggregateOptions::default()).unwrap();
    write_summaries(&output, &summaries).unwrap();

    // C: net 79.2, pnl -20.8
    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "token,quantity,date_acquired,date_sold,total_sale_proceeds,total_cost_basis,pnl\n\
         A,2,Various,2023-02-01,34,15,19\n\
         B,2,2023-03-01,Various,107,50,57\n\
         C,1,2023-05-01,2023-06-01,79,100,-21\n"
    );
}

#[test]
fn every_token_counted_once() {
    let txs = read_transactions(LEDGER.as_bytes()).unwrap();
    let summaries = aggregate_transactions(&txs, &AggregateOptions::default()).unwrap();

    let input_tokens: HashSet<&str> = txs.iter().map(|t| t.token.as_str()).collect();
    let output_tokens: HashSet<&str> = summaries.iter().map(|s| s.token.as_str()).collect();
    assert_eq!(input_tokens, output_tokens);
    assert_eq!(summaries.len(), output_tokens.len());

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for t in &txs {
        *counts.entry(t.token.as_str()).or_default() += 1;
    }
    for s in &summaries {
        assert_eq!(counts[s.token.as_str()], s.quantity);
    }

    let b = summaries.iter().find(|s| s.token == "B").unwrap();
    assert!(matches!(b.date_acquired, DateSummary::On(_)));
    assert_eq!(b.date_sold, DateSummary::Various);
    assert_eq!(b.total_cost_basis, dec!(50));
}

#[test]
fn padded_tokens_form_their_own_group() {
    let csv = concat!(
        "token,quantity,buy_date,sale_date,buy_price,sale_price,fee_percentage\n",
        "A,1,2023-01-01,2023-02-01,10,20,0\n",
        " A,1,2023-01-01,2023-02-01,5,15,0\n",
    );
    let txs = read_transactions(csv.as_bytes()).unwrap();
    let summaries = aggregate_transactions(&txs, &AggregateOptions::default()).unwrap();
    let groups: Vec<(&str, usize)> = summaries
        .iter()
        .map(|s| (s.token.as_str(), s.quantity))
        .collect();
    assert_eq!(groups, vec![("A", 1), (" A", 1)]);
}

#[test]
fn schema_error_names_missing_columns() {
    let csv = "token,quantity,buy_date,sale_date,buy_price,sale_price\nA,1,2023-01-01,2023-02-01,1,2\n";
    let err = read_transactions(csv.as_bytes()).unwrap_err();
    assert!(err.is_schema_error());
    assert!(err.to_string().contains("fee_percentage"));
}

#[test]
fn missing_input_file_is_io_error() {
    let dir = tempdir().unwrap();
    let err = load_transactions(dir.path().join("nope.csv")).unwrap_err();
    assert!(matches!(err, DataError::Io(_)));
}

#[test]
fn cli_writes_report() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("transactions.csv");
    let output = dir.path().join("summary.csv");
    fs::write(&input, LEDGER).unwrap();

    let status = Command::new(env!("CARGO_BIN_EXE_token-pnl"))
        .arg("-t")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .arg("--quiet")
        .status()
        .unwrap();
    assert!(status.success());
    let report = fs::read_to_string(&output).unwrap();
    assert!(report.starts_with("token,quantity,date_acquired"));
    assert_eq!(report.lines().count(), 4);
}

#[test]
fn cli_fails_without_partial_output() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("transactions.csv");
    let output = dir.path().join("summary.csv");
    fs::write(
        &input,
        "token,quantity,buy_date,sale_date,buy_price,sale_price,fee_percentage\n\
         A,1,2023-01-01,2023-02-01,10,20,0\n\
         A,1,2023-01-01,2023-02-01,10,20,150\n",
    )
    .unwrap();

    let status = Command::new(env!("CARGO_BIN_EXE_token-pnl"))
        .arg("--transactions")
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .status()
        .unwrap();
    assert!(!status.success());
    assert!(!output.exists());

    let status = Command::new(env!("CARGO_BIN_EXE_token-pnl"))
        .arg("--transactions")
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .arg("--allow-any-fee")
        .arg("-q")
        .status()
        .unwrap();
    assert!(status.success());
    assert!(
        fs::read_to_string(&output)
            .unwrap()
            .contains("A,2,2023-01-01,2023-02-01,10,20,-10")
    );
}
