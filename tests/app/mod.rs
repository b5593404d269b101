/*!
Process front end tests.

Command line in, verdict line and exit status out, against scripted
transports.
*/
