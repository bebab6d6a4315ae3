use api_case_runner::core::document::parse_tables;
use api_case_runner::core::execution::execute_table;
use api_case_runner::core::http::{HttpRequest, HttpResponse, Transport, TransportError};
use api_case_runner::core::instruction::compile_table;
use api_case_runner::core::variables::VariableStore;
use async_trait::async_trait;
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

const DOCUMENT: &str = r#"# TC-BENCH: Create an order

- **Module**: Orders
- **Type**: Definition
- **Status**: Unknown

| Step ID | Description | Test Data | Expected Result | Actual Result |
| ------- | ----------- | --------- | --------------- | ------------- |
| 1 | Create | Action=Send Method=POST Endpoint=tenants/@@Tenant@@/orders | Sent | |
| 2 | Auth | Action=AddHeader Name=Authorization Value="Bearer @@Token@@" | Set | |
| 3 | Trace | Action=AddQueryParameter Name=trace Value=on | Set | |
| 4 | Body | Action=AddContent ContentType=application/json Value={"sku":"A1","qty":2} | Set | |
| 5 | Status | Action=CheckStatusCode Value=201 | 201 | |
| 6 | Header | Action=CheckContentHeader Name=Content-Type Value=application/json | JSON | |
| 7 | Sku | Action=CheckContent JsonPath="$.items[?(@.sku == 'A1')].qty" Value=2 | 2 | |
| 8 | Id | Action=StoreVariable Name=OrderId JsonPath=$.id | Captured | |
"#;

const RESPONSE_BODY: &str = r#"{"id":"o-1","items":[{"sku":"B2","qty":1},{"sku":"A1","qty":2}]}"#;

/// Answers every request with the same canned response.
struct CannedTransport;

#[async_trait]
impl Transport for CannedTransport {
    async fn send(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
        Ok(HttpResponse::new(201)
            .with_header("Content-Type", "application/json")
            .with_body(RESPONSE_BODY))
    }
}

fn seeds() -> VariableStore {
    VariableStore::from_pairs(["Tenant=acme", "Token=secret"])
}

fn bench_parse_and_compile(c: &mut Criterion) {
    let variables = seeds();

    c.bench_function("parse_and_compile", |b| {
        b.iter(|| {
            let tables = parse_tables(black_box(DOCUMENT));
            let instructions = compile_table(&tables[0].steps, &variables).unwrap();
            black_box(instructions);
        });
    });
}

fn bench_execute_table(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let tables = parse_tables(DOCUMENT);
    let instructions = compile_table(&tables[0].steps, &seeds()).unwrap();
    let cancel = CancellationToken::new();

    c.bench_function("execute_table", |b| {
        b.to_async(&rt).iter(|| async {
            let result = execute_table(&instructions, "https://api.test", &CannedTransport, &cancel)
                .await
                .unwrap();
            black_box(result);
        });
    });
}

criterion_group!(benches, bench_parse_and_compile, bench_execute_table);
criterion_main!(benches);
