use crate::*;
use anyhow::Result;
use config::Config;
use tempfile::tempdir;

// -------------------- Lifecycle --------------------

#[test]
fn create_use_destroy() -> Result<()> {
    let h = EngineHandle::create()?;
    assert!(h.is_valid());
    assert_eq!(h.set("10.0.0.1", 42)?, 0);
    assert_eq!(h.get("10.0.0.1")?, 42);

    h.destroy();
    assert!(!h.is_valid());
    Ok(())
}

#[test]
fn destroy_is_idempotent() -> Result<()> {
    let h = EngineHandle::create()?;
    h.destroy();
    h.destroy();
    assert!(!h.is_valid());
    Ok(())
}

#[test]
fn every_operation_fails_after_destroy() -> Result<()> {
    let dir = tempdir()?;
    let h = EngineHandle::create()?;
    h.destroy();

    let kinds = [
        h.get("1.2.3.4").map(|_| ()),
        h.get_ex("1.2.3.4").map(|_| ()),
        h.set("1.2.3.4", 1).map(|_| ()),
        h.increment("1.2.3.4", 1).map(|_| ()),
        h.decrement("1.2.3.4", 1).map(|_| ()),
        h.delete("1.2.3.4").map(|_| ()),
        h.get_u32(1).map(|_| ()),
        h.set_u32(1, 1).map(|_| ()),
        h.bulk_load_buffer(b"1.2.3.4,1\n").map(|_| ()),
        h.decay(0.5, 0).map(|_| ()),
        h.clear(),
        h.count().map(|_| ()),
        h.block_count().map(|_| ()),
        h.memory_usage().map(|_| ()),
        h.save(dir.path().join("x.ipsa")).map(|_| ()),
        h.load(dir.path().join("x.ipsa")).map(|_| ()),
    ];
    for r in kinds {
        assert_eq!(r.unwrap_err().kind(), ErrorKind::InvalidHandle);
    }
    Ok(())
}

// -------------------- Argument validation --------------------

#[test]
fn out_of_range_values_are_invalid_arguments() -> Result<()> {
    let h = EngineHandle::create()?;
    for bad in [32768, -32768, i32::MAX, i32::MIN] {
        assert_eq!(h.set("10.0.0.1", bad).unwrap_err().kind(), ErrorKind::InvalidArgument);
        assert_eq!(h.increment("10.0.0.1", bad).unwrap_err().kind(), ErrorKind::InvalidArgument);
        assert_eq!(h.decrement_u32(1, bad).unwrap_err().kind(), ErrorKind::InvalidArgument);
    }
    assert_eq!(h.count()?, 0);
    assert_eq!(h.block_count()?, 0);

    assert_eq!(h.set("10.0.0.1", 32767)?, 0);
    assert_eq!(h.set("10.0.0.1", -32767)?, 32767);
    Ok(())
}

#[test]
fn malformed_addresses_are_invalid_arguments() -> Result<()> {
    let h = EngineHandle::create()?;
    for bad in ["", "1.2.3", "1.2.3.4.5", "256.0.0.1", "a.b.c.d", " 1.2.3.4"] {
        assert_eq!(h.get(bad).unwrap_err().kind(), ErrorKind::InvalidArgument, "{bad:?}");
        assert_eq!(h.set(bad, 1).unwrap_err().kind(), ErrorKind::InvalidArgument);
    }
    Ok(())
}

#[test]
fn strict_parsing_accepts_zero_address() -> Result<()> {
    let h = EngineHandle::create()?;
    h.set("0.0.0.0", 7)?;
    assert_eq!(h.get_u32(0)?, 7);
    Ok(())
}

#[test]
fn bogons_rejected_only_when_enabled() -> Result<()> {
    let open = EngineHandle::create()?;
    open.set("127.0.0.1", 5)?;
    assert_eq!(open.get("127.0.0.1")?, 5);

    let strict = EngineHandle::create()?.reject_bogons(true);
    let err = strict.set("127.0.0.1", 5).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BogonAddress);
    assert!(err.to_string().contains("127.0.0.1"));
    assert_eq!(strict.get("10.1.1.1").unwrap_err().kind(), ErrorKind::BogonAddress);

    // the raw API never classifies
    strict.set_u32(addr::ip_to_u32("127.0.0.1"), 5)?;
    assert_eq!(strict.get("8.8.8.8")?, 0);
    Ok(())
}

#[test]
fn config_controls_bogons_and_stripes() -> Result<()> {
    let cfg = Config {
        reject_bogons: true,
        lock_stripes: 8,
        ..Config::default()
    };
    let h = EngineHandle::with_config(&cfg)?;
    assert_eq!(h.set("192.168.0.1", 1).unwrap_err().kind(), ErrorKind::BogonAddress);
    assert_eq!(h.with(|e| Ok(e.lock_stripes()))?, 8);
    Ok(())
}

// -------------------- Operations --------------------

#[test]
fn text_and_raw_paths_agree() -> Result<()> {
    let h = EngineHandle::create()?;
    assert_eq!(h.increment("203.0.113.5", 10)?, 10);
    assert_eq!(h.decrement_u32(0xCB00_7105, 3)?, 7);
    assert_eq!(h.get_u32(0xCB00_7105)?, 7);
    assert_eq!(h.get_ex("203.0.113.6")?, Some(0));
    assert_eq!(h.get_ex("203.0.114.6")?, None);
    assert!(h.delete("203.0.113.5")?);
    assert_eq!(h.get("203.0.113.5")?, 0);
    assert!(h.delete_u32(0x0102_0304)?);
    Ok(())
}

#[test]
fn maintenance_through_handle() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("h.ipsa");
    let h = EngineHandle::create()?;

    let stats = h.bulk_load_buffer(b"10.0.0.1,100\n10.0.0.2,+40\n")?;
    assert_eq!(stats.sets + stats.updates, 2);
    assert_eq!(h.count()?, 2);
    assert!(h.memory_usage()? > 0);

    assert_eq!(h.decay(0.5, 20)?, 2);
    assert_eq!(h.get("10.0.0.1")?, 50);
    assert_eq!(h.get("10.0.0.2")?, 0);

    assert_eq!(h.save(&path)?, 1);
    h.clear()?;
    assert_eq!(h.count()?, 0);
    assert_eq!(h.load(&path)?, 1);
    assert_eq!(h.get("10.0.0.1")?, 50);
    Ok(())
}

#[test]
fn handle_is_shareable_across_threads() -> Result<()> {
    let h = EngineHandle::create()?;
    std::thread::scope(|scope| {
        for t in 0..4 {
            let h = &h;
            scope.spawn(move || {
                for i in 0..1_000u32 {
                    // racing with destroy: either applied or rejected cleanly
                    if let Err(e) = h.increment_u32(t << 24 | i, 1) {
                        assert_eq!(e.kind(), ErrorKind::InvalidHandle);
                    }
                }
            });
        }
        scope.spawn(|| h.destroy());
    });
    assert!(!h.is_valid());
    Ok(())
}

#[test]
fn version_is_semver() {
    let v = version();
    assert_eq!(v.split('.').count(), 3);
    assert!(v.split('.').all(|p| p.parse::<u32>().is_ok()));
}
