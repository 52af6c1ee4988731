use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar(config_home: &std::path::Path) -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_transportd");
    let mut child = Command::new(exe)
        .env("XDG_CONFIG_HOME", config_home)
        .env_remove("TRANSPORTD_WORKSPACE")
        .env_remove("TRANSPORTD_LOG")
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn transportd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(true),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or(json!({}))
}

fn error_code(value: &serde_json::Value) -> &str {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
}

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let workspace = temp_dir("transportd-router-smoke");
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&workspace.join("config"));

    let health = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(health["authenticated"], json!(false));
    request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "workspace.select",
        json!({ "path": workspace.join("data").to_string_lossy() }),
    );
    let opened = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "session.open",
        json!({ "userId": "u-1", "email": "coordenacao@escola.br" }),
    );
    assert_eq!(opened["displayName"], json!("coordenacao"));

    let student = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "students.create",
        json!({
            "fullName": "Ana Souza",
            "school": "EE Centro",
            "shift": "manha",
            "guardianName": "Carla Souza",
            "guardianPhone": "11 99999-0000"
        }),
    );
    let student_id = student["id"].as_str().expect("student id").to_string();
    assert_eq!(student["shift"], json!("morning"));

    let vehicle = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "vehicles.create",
        json!({ "plate": "abc1d23", "make": "Fiat", "model": "Ducato", "capacity": 16 }),
    );
    let vehicle_id = vehicle["id"].as_str().expect("vehicle id").to_string();
    assert_eq!(vehicle["plate"], json!("ABC1D23"));

    let route = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "routes.create",
        json!({ "name": "Rota Norte", "startTime": "06:30", "vehicleId": vehicle_id }),
    );
    let route_id = route["id"].as_str().expect("route id").to_string();
    assert_eq!(route["vehicle"]["plate"], json!("ABC1D23"));

    let assignment = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "assignments.create",
        json!({ "studentId": student_id, "routeId": route_id, "boardingPoint": "Praça Central" }),
    );
    let assignment_id = assignment["id"].as_str().expect("assignment id").to_string();

    let calls: Vec<(&str, serde_json::Value)> = vec![
        ("session.get", json!({})),
        ("profiles.upsert", json!({ "fullName": "Coordenação" })),
        ("profiles.me", json!({})),
        ("profiles.list", json!({})),
        ("students.list", json!({ "search": "ana" })),
        ("students.get", json!({ "id": student_id })),
        ("students.register", json!({ "name": "João Silva", "course": "Engenharia" })),
        ("students.update", json!({ "id": student_id, "patch": { "notes": "asma" } })),
        ("vehicles.list", json!({})),
        ("vehicles.get", json!({ "id": vehicle_id })),
        ("vehicles.register", json!({ "plate": "XYZ9A87", "model": "Sprinter" })),
        ("vehicles.update", json!({ "id": vehicle_id, "patch": { "status": "manutencao" } })),
        ("routes.list", json!({ "search": "abc1" })),
        ("routes.get", json!({ "id": route_id })),
        ("routes.update", json!({ "id": route_id, "patch": { "endTime": "07:40" } })),
        ("routes.capacity", json!({ "id": route_id })),
        ("assignments.list", json!({ "routeId": route_id })),
        ("monitoring.record", json!({ "routeId": route_id, "eventType": "embarque" })),
        ("monitoring.list", json!({})),
        ("incidents.register", json!({ "description": "Pneu furado", "date": "2025-08-20" })),
        ("incidents.list", json!({})),
        ("dashboard.summary", json!({})),
        ("reports.summary", json!({})),
        ("uploads.put", json!({ "fileName": "a.txt", "contentBase64": "b2k=" })),
        ("uploads.list", json!({})),
        ("settings.set", json!({ "key": "reports.weekStart", "value": "monday" })),
        ("settings.get", json!({ "key": "reports.weekStart" })),
        ("assignments.delete", json!({ "id": assignment_id })),
    ];
    for (i, (method, params)) in calls.into_iter().enumerate() {
        let id = format!("c{}", i);
        request_ok(&mut stdin, &mut reader, &id, method, params);
    }

    let unknown = request(&mut stdin, &mut reader, "u1", "students.reorder", json!({}));
    assert_eq!(error_code(&unknown), "not_implemented");

    // The route has monitoring history now.
    let refused = request(&mut stdin, &mut reader, "d1", "routes.delete", json!({ "id": route_id }));
    assert_eq!(error_code(&refused), "conflict");
    request_ok(&mut stdin, &mut reader, "d2", "students.delete", json!({ "id": student_id }));
    request_ok(&mut stdin, &mut reader, "d3", "vehicles.delete", json!({ "id": vehicle_id }));
    let closed = request_ok(&mut stdin, &mut reader, "d4", "session.close", json!({}));
    assert_eq!(closed["closed"], json!(true));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
