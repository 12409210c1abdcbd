mod cancellation_tests;
