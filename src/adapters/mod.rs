// Adapters layer: concrete implementations for the managed backend.

pub mod supabase;
