mod test_close_with_pending_events;
