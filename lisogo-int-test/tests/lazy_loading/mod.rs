mod lazy_reference_test;
