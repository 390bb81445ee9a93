mod test_ws_bus_round_trip;
