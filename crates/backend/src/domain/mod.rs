pub mod a001_call_log;
