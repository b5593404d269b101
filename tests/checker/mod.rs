/*!
Health-check engine tests.

Tests for the decision policy, the three auth strategies, the Kerberos
credential session and the orchestrator's fan-out/fan-in, all against
scripted transports.
*/

pub mod policy_tests;
