mod memory_log_sink;
