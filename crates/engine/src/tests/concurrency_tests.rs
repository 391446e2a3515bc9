use super::helpers::{assert_count_consistent, ip, s};
use crate::*;
use anyhow::Result;
use std::thread;

#[test]
fn parallel_increments_on_one_address_are_not_lost() -> Result<()> {
    const THREADS: u32 = 8;
    const PER_THREAD: u32 = 2_000;

    let e = Engine::with_stripes(2)?;
    let a = ip("10.0.0.1");

    thread::scope(|scope| {
        for _ in 0..THREADS {
            scope.spawn(|| {
                for _ in 0..PER_THREAD {
                    e.increment(a, s(1)).unwrap();
                }
            });
        }
    });

    let expected = (THREADS * PER_THREAD).min(32767);
    assert_eq!(e.get(a).get() as u32, expected);
    assert_eq!(e.count(), 1);
    Ok(())
}

#[test]
fn parallel_increments_saturate() -> Result<()> {
    let e = Engine::new()?;
    let a = ip("10.0.0.1");

    thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for _ in 0..5_000 {
                    e.increment(a, s(1)).unwrap();
                }
            });
        }
    });

    assert_eq!(e.get(a), Score::MAX);
    Ok(())
}

#[test]
fn racing_block_creation_allocates_once() -> Result<()> {
    let e = Engine::with_stripes(1)?;

    // every thread writes a different slot of the same 64 blocks
    thread::scope(|scope| {
        for t in 0..8u32 {
            let e = &e;
            scope.spawn(move || {
                for b in 0..64u32 {
                    e.set(b << 8 | t, s(1)).unwrap();
                }
            });
        }
    });

    assert_eq!(e.block_count(), 64);
    assert_eq!(e.count(), 64 * 8);
    assert_count_consistent(&e);
    Ok(())
}

#[test]
fn readers_never_see_out_of_domain_values() -> Result<()> {
    let e = Engine::new()?;
    let a = ip("10.0.0.1");

    thread::scope(|scope| {
        scope.spawn(|| {
            for i in 0..20_000i64 {
                let v = if i % 2 == 0 { Score::MAX } else { Score::MIN };
                e.set(a, v).unwrap();
            }
        });
        scope.spawn(|| {
            for _ in 0..20_000 {
                let v = e.get(a).get();
                assert!(v == 0 || v == 32767 || v == -32767);
            }
        });
    });
    Ok(())
}

#[test]
fn mixed_workload_keeps_count_consistent() -> Result<()> {
    let e = Engine::with_stripes(16)?;

    thread::scope(|scope| {
        for t in 0..6u32 {
            let e = &e;
            scope.spawn(move || {
                for i in 0..3_000u32 {
                    let a = (i % 500) << 8 | t;
                    match i % 4 {
                        0 => {
                            e.set(a, s(i64::from(i % 100))).unwrap();
                        }
                        1 => {
                            e.increment(a, s(3)).unwrap();
                        }
                        2 => {
                            e.decrement(a, s(3)).unwrap();
                        }
                        _ => {
                            e.delete(a);
                        }
                    }
                }
            });
        }
        scope.spawn(|| {
            for _ in 0..5 {
                e.decay(0.8, 1).unwrap();
            }
        });
    });

    assert_count_consistent(&e);
    assert!(e.block_count() <= 500);
    Ok(())
}
