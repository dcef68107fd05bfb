// Transfer pipeline benchmarks for the confidential token ledger.
//
// Covers request decoding, a full self-transfer through sled, and fan-out
// transfers at various output counts. Proof checks use the permissive mock
// oracle so the numbers measure ledger work, not verification.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::json;

use ctoken_protocol::ledger::Outcome;
use ctoken_protocol::{InvocationContext, Ledger, LedgerDb, MockOracle, Request};

fn issued_ledger() -> Ledger<MockOracle> {
    let ledger = Ledger::new(
        LedgerDb::open_temporary().unwrap(),
        MockOracle::permissive(),
    );
    let issue = json!({"method": "issue", "params": {
        "name": "Bench", "symbol": "BNCH",
        "token": {"commit": "C0", "range_proof": "P0", "from_pubkey": "K0", "encrypt_value": "E0"}
    }});
    ledger
        .execute(&InvocationContext::new("alice", "tx0"), &issue.to_string())
        .unwrap();
    ledger
}

fn transfer_json(input: &str, outputs: usize) -> String {
    let outputs: Vec<_> = (0..outputs)
        .map(|i| {
            json!({
                "commit": format!("C{i}"),
                "encrypt_value": "E",
                "from_pubkey": "K0",
                "range_proof": "P",
                "to": if i == 0 { "alice".to_string() } else { format!("user{i}") }
            })
        })
        .collect();
    json!({"method": "transfer", "params": {
        "inputs": [{"id": input}],
        "outputs": outputs,
        "excess_msg": "m",
        "excess_sig": "s"
    }})
    .to_string()
}

/// Run a transfer and return the id of the output retained by `alice`.
fn step(ledger: &Ledger<MockOracle>, ctx: &InvocationContext, input: &str, outputs: usize) -> String {
    match ledger.execute(ctx, &transfer_json(input, outputs)).unwrap() {
        Outcome::Transferred(receipt) => receipt.minted[0].id.to_string(),
        other => panic!("unexpected outcome {other:?}"),
    }
}

fn bench_parse_request(c: &mut Criterion) {
    let input = transfer_json("1", 4);

    c.bench_function("ledger/parse_transfer", |b| {
        b.iter(|| Request::parse(&input).unwrap());
    });
}

fn bench_self_transfer(c: &mut Criterion) {
    let ledger = issued_ledger();
    let ctx = InvocationContext::new("alice", "tx");
    let mut holding = "1".to_string();

    c.bench_function("ledger/self_transfer", |b| {
        b.iter(|| holding = step(&ledger, &ctx, &holding, 1));
    });
}

fn bench_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger/fan_out");

    for outputs in [2, 8, 32] {
        let ledger = issued_ledger();
        let ctx = InvocationContext::new("alice", "tx");
        let mut holding = "1".to_string();

        group.throughput(Throughput::Elements(outputs as u64));
        group.bench_with_input(BenchmarkId::from_parameter(outputs), &outputs, |b, &n| {
            b.iter(|| holding = step(&ledger, &ctx, &holding, n));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_parse_request, bench_self_transfer, bench_fan_out);
criterion_main!(benches);
