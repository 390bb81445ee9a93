mod test_forced_glare;
