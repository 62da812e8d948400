mod dleq_properties;
