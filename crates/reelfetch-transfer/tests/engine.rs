use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use httpmock::prelude::*;
use reelfetch_core::{FetchError, TransferInspector, TransferSnapshot, TransferState};
use reelfetch_telemetry::Metrics;
use reelfetch_transfer::{TransferConfig, TransferEngine};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

fn engine_in(dir: &TempDir, tweak: impl FnOnce(&mut TransferConfig)) -> Result<TransferEngine> {
    let mut config = TransferConfig::new(dir.path());
    config.failure_grace = Duration::from_millis(300);
    tweak(&mut config);
    Ok(TransferEngine::new(config, Metrics::new()?)?)
}

async fn wait_until(
    engine: &TransferEngine,
    mut done: impl FnMut(&[TransferSnapshot]) -> bool,
) -> Result<Vec<TransferSnapshot>> {
    for _ in 0..200 {
        let snapshots = engine.list_active();
        if done(&snapshots) {
            return Ok(snapshots);
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    Err(anyhow!("condition not reached; last state: {:?}", engine.list_active()))
}

/// Serve one response that declares `declared` bytes, sends `sent`, then
/// keeps the socket open for `hold` before dropping it.
async fn serve_truncated_body(declared: usize, sent: usize, hold: Duration) -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };
        let mut request: Vec<u8> = Vec::new();
        let mut buffer = [0_u8; 1024];
        while !request.windows(4).any(|window| window == b"\r\n\r\n") {
            match socket.read(&mut buffer).await {
                Ok(0) | Err(_) => return,
                Ok(read) => request.extend_from_slice(&buffer[..read]),
            }
        }
        let head = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\nContent-Length: {declared}\r\n\r\n"
        );
        if socket.write_all(head.as_bytes()).await.is_err()
            || socket.write_all(&vec![7_u8; sent]).await.is_err()
        {
            return;
        }
        let _ = socket.flush().await;
        tokio::time::sleep(hold).await;
    });
    Ok(format!("http://{addr}/partial/episode.mkv"))
}

#[tokio::test]
async fn completed_download_is_written_and_leaves_registry() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/media/clip.mp4");
            then.status(200).body("movie-bytes");
        })
        .await;
    let dir = TempDir::new()?;
    let engine = engine_in(&dir, |_| {})?;

    let ticket = engine.submit(&server.url("/media/clip.mp4"), None)?;
    assert_eq!(ticket.filename, "clip.mp4");

    wait_until(&engine, <[TransferSnapshot]>::is_empty).await?;
    mock.assert_async().await;
    assert_eq!(std::fs::read_to_string(dir.path().join("clip.mp4"))?, "movie-bytes");
    Ok(())
}

#[tokio::test]
async fn redirect_chain_is_followed_to_the_final_body() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/start/episode.mkv");
            then.status(302).header("Location", "/hop");
        })
        .await;
    let hop_target = server.url("/cdn/real.bin");
    server
        .mock_async(move |when, then| {
            when.method(GET).path("/hop");
            then.status(301).header("Location", hop_target.as_str());
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/cdn/real.bin");
            then.status(200).body("final-payload");
        })
        .await;
    let dir = TempDir::new()?;
    let engine = engine_in(&dir, |_| {})?;

    let ticket = engine.submit(&server.url("/start/episode.mkv"), Some("Pilot"))?;
    assert_eq!(ticket.filename, "Pilot.mkv");

    wait_until(&engine, <[TransferSnapshot]>::is_empty).await?;
    assert_eq!(
        std::fs::read_to_string(dir.path().join("Pilot.mkv"))?,
        "final-payload"
    );
    Ok(())
}

#[tokio::test]
async fn redirect_loops_fail_after_the_hop_limit() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/loop.bin");
            then.status(302).header("Location", "/loop.bin");
        })
        .await;
    let dir = TempDir::new()?;
    let engine = engine_in(&dir, |config| config.max_redirects = 2)?;

    engine.submit(&server.url("/loop.bin"), None)?;
    let snapshots = wait_until(&engine, |jobs| {
        jobs.iter().any(|job| job.state == TransferState::Failed)
    })
    .await?;
    assert_eq!(snapshots[0].status_text, "Failed: too many redirects");
    Ok(())
}

#[tokio::test]
async fn missing_source_fails_removes_file_and_expires() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/gone.mp4");
            then.status(404);
        })
        .await;
    let dir = TempDir::new()?;
    let engine = engine_in(&dir, |_| {})?;

    engine.submit(&server.url("/gone.mp4"), None)?;
    let snapshots = wait_until(&engine, |jobs| {
        jobs.iter().any(|job| job.state == TransferState::Failed)
    })
    .await?;
    let failed = &snapshots[0];
    assert!(failed.status_text.starts_with("Failed: HTTP 404"));
    assert_eq!(failed.percentage, 0);
    assert_eq!(failed.error.as_deref(), Some("HTTP 404: Not Found"));
    assert!(!dir.path().join("gone.mp4").exists());
    assert!(engine.can_admit());

    wait_until(&engine, <[TransferSnapshot]>::is_empty).await?;
    Ok(())
}

#[tokio::test]
async fn existing_file_gets_a_timestamp_suffix() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/video.mp4");
            then.status(200).body("second copy");
        })
        .await;
    let dir = TempDir::new()?;
    std::fs::write(dir.path().join("video.mp4"), "first copy")?;
    let engine = engine_in(&dir, |_| {})?;

    let ticket = engine.submit(&server.url("/video.mp4"), None)?;
    assert_ne!(ticket.filename, "video.mp4");
    let stem = ticket
        .filename
        .strip_prefix("video_")
        .and_then(|rest| rest.strip_suffix(".mp4"))
        .ok_or_else(|| anyhow!("unexpected name {}", ticket.filename))?;
    assert!(stem.chars().all(|ch| ch.is_ascii_digit()));

    wait_until(&engine, <[TransferSnapshot]>::is_empty).await?;
    assert_eq!(std::fs::read_to_string(dir.path().join("video.mp4"))?, "first copy");
    assert_eq!(
        std::fs::read_to_string(dir.path().join(&ticket.filename))?,
        "second copy"
    );
    Ok(())
}

#[tokio::test]
async fn concurrent_names_do_not_collide_while_in_flight() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/same.mp4");
            then.status(200).delay(Duration::from_millis(300)).body("x");
        })
        .await;
    let dir = TempDir::new()?;
    let engine = engine_in(&dir, |_| {})?;

    let first = engine.submit(&server.url("/same.mp4"), None)?;
    let second = engine.submit(&server.url("/same.mp4"), None)?;
    assert_eq!(first.filename, "same.mp4");
    assert_ne!(first.filename, second.filename);
    engine.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn ceiling_rejects_extra_submissions() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET);
            then.status(200).delay(Duration::from_secs(5)).body("slow");
        })
        .await;
    let dir = TempDir::new()?;
    let engine = engine_in(&dir, |config| config.max_concurrent = 2)?;

    engine.submit(&server.url("/a.bin"), None)?;
    engine.submit(&server.url("/b.bin"), None)?;
    assert!(!engine.can_admit());
    let err = engine
        .submit(&server.url("/c.bin"), None)
        .err()
        .ok_or_else(|| anyhow!("third submission should be rejected"))?;
    assert!(matches!(err, FetchError::CapacityExceeded { limit: 2 }));
    assert_eq!(err.detail(), "Maximum concurrent downloads reached (2)");
    assert_eq!(engine.list_active().len(), 2);

    engine.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn racing_submissions_never_exceed_the_ceiling() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET);
            then.status(200).delay(Duration::from_secs(5)).body("slow");
        })
        .await;
    let dir = TempDir::new()?;
    let engine = engine_in(&dir, |config| config.max_concurrent = 3)?;
    let url = Arc::new(server.url("/race.bin"));

    let mut handles = Vec::new();
    for _ in 0..12 {
        let engine = engine.clone();
        let url = Arc::clone(&url);
        handles.push(tokio::spawn(async move { engine.submit(&url, None).is_ok() }));
    }
    let mut admitted = 0;
    for handle in handles {
        if handle.await? {
            admitted += 1;
        }
    }
    assert_eq!(admitted, 3);
    assert_eq!(engine.list_active().len(), 3);

    engine.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn cancel_stops_transfer_and_marks_it_cancelled() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/long.mkv");
            then.status(200).delay(Duration::from_secs(5)).body("never");
        })
        .await;
    let dir = TempDir::new()?;
    let engine = engine_in(&dir, |_| {})?;

    let ticket = engine.submit(&server.url("/long.mkv"), None)?;
    engine.cancel(ticket.id)?;

    let snapshots = wait_until(&engine, |jobs| {
        jobs.iter().any(|job| job.state == TransferState::Cancelled)
    })
    .await?;
    assert_eq!(snapshots[0].status_text, "Cancelled");
    assert!(engine.cancel(ticket.id).is_err());
    assert!(!dir.path().join("long.mkv").exists());
    Ok(())
}

#[tokio::test]
async fn stalled_source_times_out() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/stall.bin");
            then.status(200).delay(Duration::from_secs(3)).body("late");
        })
        .await;
    let dir = TempDir::new()?;
    let engine = engine_in(&dir, |config| {
        config.idle_timeout = Duration::from_millis(200);
    })?;

    engine.submit(&server.url("/stall.bin"), None)?;
    let snapshots = wait_until(&engine, |jobs| {
        jobs.iter().any(|job| job.state == TransferState::Failed)
    })
    .await?;
    assert_eq!(
        snapshots[0].error.as_deref(),
        Some("download source request timed out after 200ms")
    );
    Ok(())
}

#[tokio::test]
async fn completed_jobs_stay_visible_with_retention() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/keep.mp3");
            then.status(200).body("abcd");
        })
        .await;
    let dir = TempDir::new()?;
    let engine = engine_in(&dir, |config| {
        config.completed_retention = Duration::from_secs(30);
    })?;

    let ticket = engine.submit(&server.url("/keep.mp3"), None)?;
    let snapshots = wait_until(&engine, |jobs| {
        jobs.iter().any(|job| job.state == TransferState::Completed)
    })
    .await?;
    assert_eq!(snapshots[0].status_text, "Completed (4 B)");
    assert_eq!(snapshots[0].percentage, 100);
    assert_eq!(engine.get(ticket.id).map(|job| job.downloaded_bytes), Some(4));
    assert!(engine.can_admit());
    assert_eq!(engine.list_active().len(), 1);
    assert_eq!(engine.active_count(), 0);
    Ok(())
}

#[tokio::test]
async fn invalid_urls_are_rejected_synchronously() -> Result<()> {
    let dir = TempDir::new()?;
    let engine = engine_in(&dir, |_| {})?;

    for raw in ["", "   ", "nota url", "ftp://host/file"] {
        let err = engine
            .submit(raw, None)
            .err()
            .ok_or_else(|| anyhow!("{raw:?} should be rejected"))?;
        assert!(matches!(err, FetchError::InvalidInput { field: "url", .. }));
    }
    assert!(engine.list_active().is_empty());
    Ok(())
}

#[tokio::test]
async fn connection_lost_mid_body_fails_and_removes_partial_file() -> Result<()> {
    let source = serve_truncated_body(100_000, 5_000, Duration::ZERO).await?;
    let dir = TempDir::new()?;
    let engine = engine_in(&dir, |_| {})?;

    let ticket = engine.submit(&source, None)?;
    assert_eq!(ticket.filename, "episode.mkv");
    let snapshots = wait_until(&engine, |jobs| {
        jobs.iter().any(|job| job.state == TransferState::Failed)
    })
    .await?;

    assert!(snapshots[0].status_text.starts_with("Failed: "));
    assert!(snapshots[0].error.is_some());
    assert!(!dir.path().join("episode.mkv").exists());
    assert!(engine.can_admit());
    Ok(())
}

#[tokio::test]
async fn cancel_during_body_stops_at_chunk_boundary_and_removes_file() -> Result<()> {
    let source = serve_truncated_body(100_000, 5_000, Duration::from_secs(10)).await?;
    let dir = TempDir::new()?;
    let engine = engine_in(&dir, |_| {})?;

    let ticket = engine.submit(&source, None)?;
    wait_until(&engine, |jobs| {
        jobs.iter()
            .any(|job| job.state == TransferState::Downloading && job.downloaded_bytes > 0)
    })
    .await?;
    assert!(dir.path().join("episode.mkv").exists());
    assert_eq!(engine.active_count(), 1);

    engine.cancel(ticket.id)?;
    let snapshots = wait_until(&engine, |jobs| {
        jobs.iter().any(|job| job.state == TransferState::Cancelled)
    })
    .await?;
    assert_eq!(snapshots[0].status_text, "Cancelled");
    assert!(!dir.path().join("episode.mkv").exists());
    assert_eq!(engine.active_count(), 0);
    Ok(())
}
