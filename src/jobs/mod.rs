pub mod prune_idempotency;
