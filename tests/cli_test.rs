use assert_fs::prelude::*;
use predicates::prelude::*;

fn command(temp: &assert_fs::TempDir) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new(env!("CARGO_BIN_EXE_exam_assistant"));
    cmd.current_dir(temp.path())
        .env("DATA_DIR", temp.path())
        .env("VECTORSTORE_DIR", temp.path().join("vectorstore"))
        .env("LLM_PROVIDER", "ollama")
        .env("LOG_LEVEL", "error");
    cmd
}

#[tokio::test]
async fn test_stats_on_fresh_data_dir() {
    let temp = assert_fs::TempDir::new().unwrap();

    let output = command(&temp).arg("stats").output().await.unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(predicate::str::contains("Questions asked: 0").eval(&stdout));
    assert!(predicate::str::contains("Quizzes taken:   0").eval(&stdout));
}

#[tokio::test]
async fn test_index_rejects_non_pdf() {
    let temp = assert_fs::TempDir::new().unwrap();
    let notes = temp.child("notes.txt");
    notes.write_str("Osmosis is the movement of water.").unwrap();

    let output = command(&temp)
        .arg("index")
        .arg(notes.path())
        .output()
        .await
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(predicate::str::contains("PDF only").eval(&stderr));
    temp.child("vectorstore/index.json")
        .assert(predicate::path::missing());
}

#[tokio::test]
async fn test_invalid_difficulty_is_a_usage_error() {
    let temp = assert_fs::TempDir::new().unwrap();

    let output = command(&temp)
        .args(["quiz", "--difficulty", "impossible"])
        .output()
        .await
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(predicate::str::contains("unknown difficulty").eval(&stderr));
}
