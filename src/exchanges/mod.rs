pub mod bitrue;
