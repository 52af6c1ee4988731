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
fn route_capacity_and_delete_cascade() {
    let workspace = temp_dir("transportd-route-capacity");
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&workspace.join("config"));
    request_ok(
        &mut stdin,
        &mut reader,
        "ws",
        "workspace.select",
        json!({ "path": workspace.join("data").to_string_lossy() }),
    );
    request_ok(
        &mut stdin,
        &mut reader,
        "session",
        "session.open",
        json!({ "userId": "u-1", "email": "rotas@escola.br" }),
    );

    let route = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "routes.create",
        json!({ "name": "Rota Sul", "startTime": "12:10", "shift": "tarde" }),
    );
    let route_id = route["id"].as_str().expect("route id").to_string();
    assert_eq!(route["shift"], json!("afternoon"));

    let cap = request_ok(&mut stdin, &mut reader, "2", "routes.capacity", json!({ "id": route_id }));
    assert!(cap["capacity"].is_null());
    assert!(cap["available"].is_null());

    let vehicle = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "vehicles.create",
        json!({ "plate": "VAN0001", "model": "Sprinter", "capacity": 2 }),
    );
    let vehicle_id = vehicle["id"].as_str().expect("vehicle id").to_string();
    let updated = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "routes.update",
        json!({ "id": route_id, "patch": { "vehicleId": vehicle_id } }),
    );
    assert_eq!(updated["vehicle"]["plate"], json!("VAN0001"));

    let mut student_ids = Vec::new();
    for (i, name) in ["Caio", "Davi", "Elisa"].into_iter().enumerate() {
        let s = request_ok(
            &mut stdin,
            &mut reader,
            &format!("s{}", i),
            "students.create",
            json!({ "fullName": name, "school": "EE Sul" }),
        );
        student_ids.push(s["id"].as_str().expect("student id").to_string());
    }
    for (i, sid) in student_ids.iter().enumerate() {
        request_ok(
            &mut stdin,
            &mut reader,
            &format!("a{}", i),
            "assignments.create",
            json!({ "studentId": sid, "routeId": route_id, "boardingPoint": "Esquina" }),
        );
    }
    let dup = request(
        &mut stdin,
        &mut reader,
        "5",
        "assignments.create",
        json!({ "studentId": student_ids[0], "routeId": route_id, "boardingPoint": "Esquina" }),
    );
    assert_eq!(error_code(&dup), "conflict");

    let cap = request_ok(&mut stdin, &mut reader, "6", "routes.capacity", json!({ "id": route_id }));
    assert_eq!(cap["capacity"], json!(2));
    assert_eq!(cap["assigned"], json!(3));
    assert_eq!(cap["available"], json!(0));

    let by_student = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "assignments.list",
        json!({ "studentId": student_ids[1] }),
    );
    assert_eq!(by_student["assignments"].as_array().map(|a| a.len()), Some(1));

    let still_assigned = request(
        &mut stdin,
        &mut reader,
        "7b",
        "students.delete",
        json!({ "id": student_ids[1] }),
    );
    assert_eq!(error_code(&still_assigned), "conflict");
    request_ok(&mut stdin, &mut reader, "7c", "students.get", json!({ "id": student_ids[1] }));

    request_ok(&mut stdin, &mut reader, "8", "routes.delete", json!({ "id": route_id }));
    let left = request_ok(&mut stdin, &mut reader, "9", "assignments.list", json!({}));
    assert_eq!(left["assignments"], json!([]));
    request_ok(
        &mut stdin,
        &mut reader,
        "9b",
        "students.delete",
        json!({ "id": student_ids[1] }),
    );
    let gone = request(&mut stdin, &mut reader, "10", "routes.get", json!({ "id": route_id }));
    assert_eq!(error_code(&gone), "not_found");

    let routes = request_ok(&mut stdin, &mut reader, "11", "routes.list", json!({}));
    assert_eq!(routes["emptyMessage"], json!("Nenhuma rota encontrada"));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
