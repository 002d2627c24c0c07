mod dialect_test;
