mod benchmark;
mod mock_runner;
